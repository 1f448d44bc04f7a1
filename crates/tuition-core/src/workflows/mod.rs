pub mod outcome;
pub mod parents;
pub mod vacancy;
