use super::{Component, Entity, Name, Universe};

/// Creates an entity and attaches its initial components in one go.
///
/// ```
/// # use tether::entities::{Name, Universe};
/// let mut universe = Universe::new();
/// let door = universe.build_entity().with_name("Door").finish();
/// assert_eq!(universe.get_component::<Name>(door).unwrap().as_str(), "Door");
/// ```
pub struct EntityBuilder<'uni> {
    universe: &'uni mut Universe,
    entity: Entity,
}

impl<'uni> EntityBuilder<'uni> {
    pub fn new(universe: &'uni mut Universe) -> Self {
        Self {
            entity: universe.create_entity(),
            universe,
        }
    }

    pub fn with_component(self, value: impl Component) -> Self {
        self.universe.set_component(self.entity, value);
        self
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_component(Name::new(name))
    }

    pub fn finish(self) -> Entity {
        self.entity
    }
}
