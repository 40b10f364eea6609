pub mod machine_builder;
pub mod recording_view;
