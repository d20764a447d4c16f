mod entity_type;

pub use self::entity_type::{
    FieldDescriptor, InputMode, ScalarKind, SchemaError, TypeDescriptor, BOOK,
};
