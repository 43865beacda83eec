pub mod inspection;
pub mod item_ctx;

pub use inspection::{
    AcceptGate, AiInspector, AlwaysAccept, CroppedImage, InspectionReport, Inspector, RegionCropper, WholeImage,
};
pub use item_ctx::ItemCtx;
