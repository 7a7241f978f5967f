use buildable::{Buildable, Builder};

type Validator = Box<dyn Fn(&str) -> bool>;

#[derive(Builder)]
struct Pipeline {
    name: String,
    map: Box<dyn Fn(i64) -> i64>,
    on_complete: Option<Box<dyn FnOnce(i64)>>,
    #[builder(escaping)]
    validator: Validator,
    #[builder(default = |acc, x| acc + x)]
    reduce: fn(i64, i64) -> i64,
}

fn main() {
    println!("=== Closures Example ===\n");

    let factor = 3;
    let pipeline = Pipeline::build(|b| {
        b.name("triple-sum".to_string())
            .map(move |x| x * factor)
            .on_complete(|total| println!("Pipeline finished with {}", total))
            .validator(Box::new(|input: &str| !input.is_empty()))
    })
    .expect("Failed to build pipeline");

    let inputs = ["1", "2", "", "4"];
    let total = inputs
        .into_iter()
        .filter(|input| (pipeline.validator)(*input))
        .filter_map(|input| input.parse::<i64>().ok())
        .map(|x| (pipeline.map)(x))
        .fold(0, pipeline.reduce);
    println!("{}: {}", pipeline.name, total);

    if let Some(on_complete) = pipeline.on_complete {
        on_complete(total);
    }
}
