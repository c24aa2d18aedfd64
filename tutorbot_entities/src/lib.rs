pub mod agents;
pub mod turns;

pub mod prelude {
    pub use super::agents::Entity as Agents;
    pub use super::turns::Entity as Turns;
}
