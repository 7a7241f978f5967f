use buildable::Builder;

#[derive(Builder)]
pub struct Job {
    pub name: String,
    pub build: u32,
}

fn main() {}
