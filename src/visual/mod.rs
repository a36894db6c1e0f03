pub mod driver;

pub use driver::{RenderDescriptor, VisualConfig, VisualizationDriver};
