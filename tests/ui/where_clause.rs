use std::fmt::Display;

use buildable::Builder;

#[derive(Builder)]
struct Labeled<'a, T>
where
    T: Display + Clone,
{
    label: &'a str,
    value: T,
    #[builder(default)]
    history: Vec<T>,
}

fn describe<T: Display + Clone>(labeled: &Labeled<'_, T>) -> String {
    format!("{}={} ({})", labeled.label, labeled.value, labeled.history.len())
}

fn main() {
    let labeled = Labeled::builder().label("answer").value(42).build().unwrap();
    assert_eq!(describe(&labeled), "answer=42 (0)");
}
