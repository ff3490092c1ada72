#![allow(dead_code)]

use structarray::{discriminant, family, variant};

pub trait Shape {
    fn volume(&self) -> i32;
    fn stretch(&mut self, by: i32);
}

variant! {
    #[derive(Debug, PartialEq)]
    pub struct Square {
        pub side: i32,
    }
}

variant! {
    #[derive(Debug, PartialEq)]
    pub struct Cuboid {
        pub square: Square,
        pub depth: i32,
    }
}

impl Shape for Square {
    fn volume(&self) -> i32 {
        0
    }

    fn stretch(&mut self, by: i32) {
        self.side += by;
    }
}

impl Shape for Cuboid {
    fn volume(&self) -> i32 {
        self.square.side * self.square.side * self.depth
    }

    fn stretch(&mut self, by: i32) {
        self.depth += by;
    }
}

discriminant! {
    pub enum ShapeKind {
        Square,
        Cuboid,
    }
}

family! {
    pub struct Shapes: dyn Shape => ShapeKind {
        Square,
        Cuboid,
    }
}
