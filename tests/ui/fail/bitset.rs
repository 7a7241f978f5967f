use buildable::Builder;

// rustc accepts tool attributes unchecked, so only the derive reports here.
#[derive(Builder)]
#[rustfmt::bitfield]
pub struct Flags {
    pub dirty: bool,
    pub visible: bool,
}

fn main() {}
