pub mod record_material_movement_command;

pub use record_material_movement_command::RecordMaterialMovementCommand;
