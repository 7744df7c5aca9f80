use super::{Component, Entity, EntityBuilder};
use crate::host::{Capability, ObjectModel};
use ahash::AHashMap;
use std::any::{Any, TypeId};
use std::{iter, num::NonZeroU32};

/// Amount of [`Universe`] slots to grow by whenever the containers run out of space.
const ECS_GROW_AMOUNT: u32 = 50;

pub struct Universe {
    top_generation: NonZeroU32,
    free_indices: Vec<u32>,
    generations: Vec<Option<NonZeroU32>>,

    vectors: AHashMap<TypeId, Box<dyn ComponentVec>>,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    pub fn new() -> Self {
        Self {
            top_generation: NonZeroU32::MIN,
            free_indices: vec![],
            generations: vec![],
            vectors: AHashMap::default(),
        }
    }

    fn get_component_vec<T: Component>(&self) -> Option<&ComponentVecImpl<T>> {
        self.vectors
            .get(&TypeId::of::<T>())
            .map(|vector| vector.try_cast().expect("invalid internal ecs type mapping"))
    }

    fn get_component_vec_mut<T: Component>(&mut self) -> &mut ComponentVecImpl<T> {
        self.vectors
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentVecImpl::<T>::new()))
            .try_cast_mut()
            .expect("invalid internal ecs type mapping")
    }

    /// Allocates a new entity slot.
    ///
    /// ## Panics
    ///  - on index overflow
    ///  - on generation overflow
    pub fn create_entity(&mut self) -> Entity {
        if self.free_indices.is_empty() {
            let top_index = self.generations.len() as u32;
            let new_top_index = top_index
                .checked_add(ECS_GROW_AMOUNT)
                .expect("ECS index overflow??");
            self.free_indices.extend((top_index..new_top_index).rev());
        }

        let index = self.free_indices.pop().unwrap();
        let generation = self.top_generation;
        self.top_generation = generation
            .checked_add(1)
            .expect("ECS generation overflow??");

        vec_write_with_grow(&mut self.generations, index as usize, Some(generation));

        Entity { index, generation }
    }

    /// Starts building a new entity.
    pub fn build_entity(&mut self) -> EntityBuilder<'_> {
        EntityBuilder::new(self)
    }

    /// Deletes the entity and drops all of its components.
    ///
    /// ## Panics
    ///  - if the handle is invalid
    pub fn delete_entity(&mut self, entity: Entity) {
        assert!(
            self.validate_entity(entity),
            "attempting to delete an invalid entity"
        );

        for vector in self.vectors.values_mut() {
            vector.clear(entity.index);
        }

        self.generations[entity.index as usize] = None;
        self.free_indices.push(entity.index);
    }

    /// Checks whether provided [`Entity`] constitutes a valid handle.
    #[inline]
    pub fn validate_entity(&self, entity: Entity) -> bool {
        if let Some(&generation) = self.generations.get(entity.index as usize) {
            Some(entity.generation) == generation
        } else {
            false
        }
    }

    /// Adds a component to the specified entity. The component is overwritten if it already exists.
    ///
    /// ## Panics
    ///  - if the handle is invalid
    pub fn set_component<T: Component>(&mut self, entity: Entity, value: T) {
        assert!(self.validate_entity(entity), "invalid entity access");
        self.get_component_vec_mut::<T>().set(entity.index, value);
    }

    /// Removes a component from the specified entity, returning it. Invalid handles and missing
    /// components yield [`None`].
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.validate_entity(entity) {
            return None;
        }
        self.get_component_vec_mut::<T>().take(entity.index)
    }

    /// Checks if the entity is valid and has a specified component.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Returns an optional component reference of the specified entity. Invalid handles yield
    /// [`None`].
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.validate_entity(entity) {
            return None;
        }
        self.get_component_vec::<T>()?.get(entity.index)
    }

    /// Returns an optional mutable component reference of the specified entity. Invalid handles
    /// yield [`None`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.validate_entity(entity) {
            return None;
        }
        self.get_component_vec_mut::<T>().get_mut(entity.index)
    }

    /// Returns an iterator that scans through all valid entities with component `T`.
    pub fn get_components<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.get_component_vec::<T>()
            .into_iter()
            .flat_map(|vector| vector.backend.iter().enumerate())
            .filter_map(|(index, component)| {
                let generation = self.generations.get(index).copied().flatten()?;
                Some((
                    Entity {
                        index: index as u32,
                        generation,
                    },
                    component.as_ref()?,
                ))
            })
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.generations
            .iter()
            .enumerate()
            .filter_map(|(index, generation)| {
                Some(Entity {
                    index: index as u32,
                    generation: (*generation)?,
                })
            })
    }

    /// Counts the live entities. Linear in the amount of slots.
    pub fn entity_count(&self) -> usize {
        self.generations.iter().filter(|gen| gen.is_some()).count()
    }
}

impl ObjectModel for Universe {
    type Handle = Entity;

    fn is_live(&self, handle: Entity) -> bool {
        self.validate_entity(handle)
    }

    fn capability<C: Capability>(&self, handle: Entity) -> Option<&C> {
        if !self.validate_entity(handle) {
            return None;
        }

        self.vectors
            .get(&TypeId::of::<C>())?
            .get_any(handle.index)?
            .downcast_ref::<C>()
    }
}

/// Trait representing a type that contains within itself a [`ComponentVecImpl`].
///
/// Allows clearing slots and reading components without knowing the component type, which is
/// needed when deleting entities and when answering capability queries.
trait ComponentVec: Any + Send + Sync {
    fn clear(&mut self, index: u32);
    fn get_any(&self, index: u32) -> Option<&dyn Any>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn ComponentVec {
    fn try_cast<T: Component>(&self) -> Option<&ComponentVecImpl<T>> {
        self.as_any().downcast_ref()
    }

    fn try_cast_mut<T: Component>(&mut self) -> Option<&mut ComponentVecImpl<T>> {
        self.as_any_mut().downcast_mut()
    }
}

impl<T: Component> ComponentVec for ComponentVecImpl<T> {
    fn clear(&mut self, index: u32) {
        self.take(index);
    }

    fn get_any(&self, index: u32) -> Option<&dyn Any> {
        self.get(index).map(|component| component as &dyn Any)
    }

    fn as_any(&self) -> &dyn Any {
        self as &dyn Any
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self as &mut dyn Any
    }
}

struct ComponentVecImpl<T: Component> {
    backend: Vec<Option<T>>,
}

impl<T: Component> ComponentVecImpl<T> {
    const fn new() -> Self {
        Self {
            backend: Vec::new(),
        }
    }

    fn get(&self, index: u32) -> Option<&T> {
        self.backend.get(index as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.backend.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Sets a specified component, growing the underlying vector if necessary.
    fn set(&mut self, index: u32, value: T) {
        let index = index as usize;
        if index >= self.backend.len() {
            self.backend.resize_with(index + 1, || None);
        }
        self.backend[index] = Some(value);
    }

    fn take(&mut self, index: u32) -> Option<T> {
        self.backend.get_mut(index as usize).and_then(Option::take)
    }
}

fn vec_write_with_grow<T: Default>(vec: &mut Vec<T>, index: usize, value: T) {
    if index >= vec.len() {
        let missing = index - vec.len() + 1;
        vec.extend(iter::repeat_with(T::default).take(missing));
    }
    vec[index] = value;
}
