pub mod availability;
pub mod catalog;
pub mod geometry;
pub mod job;
pub mod location;
pub mod partition;
pub mod time;
pub mod token;

pub use availability::{AvailabilityFilter, AvailabilityRow};
pub use catalog::{
    CubeDescriptor, CubeSummary, DimensionDescriptor, DimensionKind, DimensionMember, Measure,
};
pub use geometry::{AreaShape, BoundingBox, GeoPoint};
pub use job::{JobHandle, JobKind, JobResult, JobStatus, TableResult};
pub use location::{Location, RasterLink, Workspace};
pub use partition::Partition;
pub use time::{parse_time_code, TimeRange};
pub use token::{Token, TokenGrant};
