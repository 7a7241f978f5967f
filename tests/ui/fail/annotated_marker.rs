use std::marker::PhantomData;

use buildable::Builder;

#[derive(Builder)]
pub struct Typed<T> {
    pub id: u32,
    #[builder(ignore)]
    pub marker: PhantomData<T>,
}

fn main() {}
