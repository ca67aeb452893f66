pub mod adjustment;
pub mod device;
pub mod partitioning;
pub mod profile_model;
pub mod quantity_model;
pub mod removal;
pub mod vapor_pressure;

pub use adjustment::Adjustment;
pub use device::{Device, StageInput};
pub use partitioning::{PartitioningDevice, PartitioningParameters};
pub use profile_model::{build_device, ProfileModel};
pub use quantity_model::QuantityModel;
pub use removal::RemovalEfficiencyDevice;
pub use vapor_pressure::VaporPressure;
