mod blob;
pub use blob::*;

mod lat_lng_bounds;
pub use lat_lng_bounds::*;

mod region;
pub use region::*;

mod resource;
pub use resource::*;

mod response;
pub use response::*;
