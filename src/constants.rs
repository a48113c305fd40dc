/// Constants used by the retry orchestrator and generator defaults.
pub mod generator {
    /// Default deterministic seed used when the caller does not supply one.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default number of full selection attempts before a paper is declared impossible.
    pub const DEFAULT_MAX_ATTEMPTS: usize = 200;
    /// Default per-requirement node budget for the fixed-count subset search.
    pub const DEFAULT_SEARCH_MAX_NODES: usize = 250_000;
    /// Offset mixed into per-call RNG seed derivation so paper ids diverge.
    pub const CALL_SEED_OFFSET: u64 = 0x9A9E_5EED;
    /// Search spaces above this size are logged as a warning before searching.
    pub const LARGE_SEARCH_SPACE: u128 = 1_000_000_000;
}

/// Bucket naming used by partition keys and built-in profiles.
pub mod buckets {
    /// Bucket holding every nested (multi-part) question.
    pub const NESTED: &str = "nested";
    /// Bucket holding every standalone question.
    pub const STANDALONE: &str = "standalone";
    /// Bucket holding items named by caller selection hints.
    pub const HINTED: &str = "hinted";
    /// Separator between bucket name segments.
    pub const SEGMENT_DELIMITER: &str = ":";

    /// Bucket for all items worth exactly `marks`.
    pub fn marks(marks: u32) -> String {
        format!("marks{SEGMENT_DELIMITER}{marks}")
    }

    /// Bucket for standalone items worth exactly `marks`.
    pub fn standalone_marks(marks: u32) -> String {
        format!("{STANDALONE}{SEGMENT_DELIMITER}{}", self::marks(marks))
    }

    /// Bucket for nested items worth exactly `marks`.
    pub fn nested_marks(marks: u32) -> String {
        format!("{NESTED}{SEGMENT_DELIMITER}{}", self::marks(marks))
    }

    /// Bucket for items in paper section `section`.
    pub fn section(section: &str) -> String {
        format!("section{SEGMENT_DELIMITER}{section}")
    }

    /// Bucket for items of question type `kind`.
    pub fn kind(kind: &str) -> String {
        format!("kind{SEGMENT_DELIMITER}{kind}")
    }

    /// Bucket for items of question type `kind` inside section `section`.
    pub fn section_kind(section: &str, kind: &str) -> String {
        format!(
            "{}{SEGMENT_DELIMITER}{}",
            self::section(section),
            self::kind(kind)
        )
    }
}

/// Identifiers of the built-in paper profiles.
pub mod papers {
    /// Biology Paper 1.
    pub const BIOLOGY_1: &str = "biology-1";
    /// Chemistry Paper 1.
    pub const CHEMISTRY_1: &str = "chemistry-1";
    /// Chemistry Paper 2.
    pub const CHEMISTRY_2: &str = "chemistry-2";
    /// Mathematics Paper 1.
    pub const MATHEMATICS_1: &str = "mathematics-1";
    /// Mathematics Paper 2.
    pub const MATHEMATICS_2: &str = "mathematics-2";
    /// English Paper 1.
    pub const ENGLISH_1: &str = "english-1";
    /// English Paper 2.
    pub const ENGLISH_2: &str = "english-2";
    /// English Paper 3.
    pub const ENGLISH_3: &str = "english-3";
    /// Geography Paper 1.
    pub const GEOGRAPHY_1: &str = "geography-1";
    /// Geography Paper 2.
    pub const GEOGRAPHY_2: &str = "geography-2";

    /// Canonical catalog order.
    pub const ALL_PAPERS: [&str; 10] = [
        BIOLOGY_1,
        CHEMISTRY_1,
        CHEMISTRY_2,
        MATHEMATICS_1,
        MATHEMATICS_2,
        ENGLISH_1,
        ENGLISH_2,
        ENGLISH_3,
        GEOGRAPHY_1,
        GEOGRAPHY_2,
    ];
}

/// Question type and section tags used by the built-in profiles.
pub mod tags {
    /// Section A tag.
    pub const SECTION_A: &str = "A";
    /// Section B tag.
    pub const SECTION_B: &str = "B";
    /// Mathematics Section I tag.
    pub const SECTION_I: &str = "I";
    /// Mathematics Section II tag.
    pub const SECTION_II: &str = "II";

    /// Geography map-reading question.
    pub const KIND_MAP: &str = "map";
    /// English functional writing task.
    pub const KIND_FUNCTIONAL: &str = "functional";
    /// English cloze test.
    pub const KIND_CLOZE: &str = "cloze";
    /// English oral skills question.
    pub const KIND_ORAL: &str = "oral";
    /// English comprehension passage.
    pub const KIND_COMPREHENSION: &str = "comprehension";
    /// English literary excerpt.
    pub const KIND_EXCERPT: &str = "excerpt";
    /// English poem.
    pub const KIND_POEM: &str = "poem";
    /// English grammar question.
    pub const KIND_GRAMMAR: &str = "grammar";
    /// English imaginative composition.
    pub const KIND_COMPOSITION: &str = "composition";
    /// English compulsory set-text essay.
    pub const KIND_COMPULSORY_ESSAY: &str = "compulsory_essay";
    /// English optional set-text essay.
    pub const KIND_OPTIONAL_ESSAY: &str = "optional_essay";
}

/// Constants used by filesystem item sources.
pub mod file_source {
    /// Source id reported by `FileItemSource` unless overridden.
    pub const DEFAULT_SOURCE_ID: &str = "items_dir";
    /// File extension for JSON array item files.
    pub const JSON_EXTENSION: &str = "json";
    /// File extension for newline-delimited JSON item files.
    pub const JSONL_EXTENSION: &str = "jsonl";
}
