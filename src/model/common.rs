use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Entity type tag for audit rows attached to orders.
pub const ENTITY_ORDER: &str = "order";
