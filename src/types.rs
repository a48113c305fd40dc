/// Unique question identifier (stable across runs).
/// Example: `chem-f3-mole-017`
pub type ItemId = String;
/// Identifier for a syllabus topic used to scope the pool.
/// Examples: `chem::mole_concept`, `geo::weathering`
pub type TopicId = String;
/// Identifier for a paper type resolving to a target profile.
/// Examples: `chemistry-2`, `geography-1`
pub type PaperId = String;
/// Name of a pool bucket produced by a partition key.
/// Examples: `nested`, `standalone:marks:3`, `section:B:kind:map`
pub type BucketName = String;
/// Categorical tag value carried by an item.
/// Examples: `A`, `map`, `functional`
pub type TagValue = String;
/// Mark value of a single question or a sum of questions.
pub type Marks = u32;
