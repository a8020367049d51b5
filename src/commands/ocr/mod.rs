mod engine;
mod naming;
mod output;
mod pipeline;
mod render;
mod run;
mod walk;

pub use naming::infer_output_filename;
pub use run::run;
pub use walk::CaseWalker;
