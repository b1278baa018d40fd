pub mod atom_index;
pub mod checkpoint;
pub mod elements;
pub mod npz;
pub mod samples;
pub mod xyz;

pub use atom_index::{
    AtomIndex,
    AtomRecord,
};
pub use checkpoint::{
    ParameterMapping,
    ParamValue,
    Tensor,
};
pub use npz::MdDataset;
pub use samples::{
    Samples,
    TrajectoryBatch,
};
pub use xyz::XyzLayout;
