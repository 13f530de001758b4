pub mod dct;
pub mod zigzag;

pub use dct::{max_basis_amplitude, Block, DctTables};
pub use zigzag::zigzag;
