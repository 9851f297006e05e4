pub mod check;
pub mod design;
