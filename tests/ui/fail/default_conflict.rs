use buildable::Builder;

#[derive(Builder)]
pub struct Counter {
    pub name: String,
    #[builder(default, default = 3)]
    pub hits: u64,
}

fn main() {}
