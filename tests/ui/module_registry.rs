#[buildable::builders]
mod shapes {
    use buildable::Builder;

    #[derive(Builder, Debug)]
    pub struct Canvas {
        pub origin: Point,
        pub extent: Option<Point>,
    }

    pub mod geometry {
        use buildable::Builder;

        #[derive(Builder, Debug, Clone, Copy)]
        pub struct Point {
            pub x: i32,
            #[builder(default)]
            pub y: i32,
        }
    }

    pub use geometry::Point;
}

fn main() {
    let canvas = shapes::Canvas::builder()
        .origin_builder(|p| p.x(1))
        .extent_builder(|p| p.x(5).y(5))
        .build()
        .unwrap();
    assert_eq!(canvas.origin.y, 0);
    assert_eq!(canvas.extent.map(|p| p.x), Some(5));
}
