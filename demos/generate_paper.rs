use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    papergen::apps::run_generate_paper(std::env::args().skip(1))
}
