mod frame;
mod response;

pub use frame::{Field, Frame, FrameMeta};
pub use response::{
    CheckHealthResult, DataResponse, HealthStatus, QueryDataResponse, ResponseError,
    ResponseStatus,
};
