//! Component identity and bundle reflection.
//!
//! This module defines how Rust types become storable components:
//!
//! - [`Component`] marks a type as storable. Plain scalar types implement
//!   it out of the box; user types opt in with an empty impl.
//! - [`ComponentDescriptor`] captures everything a column needs to store a
//!   component without knowing its type: identity hashes, size, alignment,
//!   and an optional destructor.
//! - [`Bundle`] reflects a compile-time group of component values into a
//!   descriptor list plus an ordered pointer walk, which is all the world
//!   needs to place the values into columns.
//!
//! ## Named instances
//!
//! The same underlying type can back several independent columns by giving
//! each instance a name ([`named`]): a descriptor's `instance_type_id`
//! mixes the name into the type hash, so `named::<i32>("hp", ..)` and
//! `named::<i32>("mp", ..)` intern to distinct component ids.
//!
//! ## Nesting
//!
//! `Bundle` is implemented for every component, for [`Named`] wrappers,
//! and for tuples of bundles up to arity 8. Tuples flatten, so bundle
//! composition is associative; duplicate components de-duplicate at
//! insertion time by `instance_type_id`, with the most recent value
//! winning.

use std::any::type_name;
use std::mem::{align_of, needs_drop, size_of};

use crate::engine::storage::DropFn;
use crate::engine::types::{hash_instance, hash_type_name, TypeHash};

/// Marker for types that can be stored as components.
///
/// Implement it with an empty `impl` block:
///
/// ```
/// use strata_ecs::engine::component::Component;
///
/// #[derive(Clone, Copy)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
/// ```
pub trait Component: Send + Sync + 'static {}

macro_rules! scalar_components {
    ($($scalar:ty),*) => {
        $(impl Component for $scalar {})*
    };
}

scalar_components!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String
);

unsafe fn drop_erased<T>(pointer: *mut u8) {
    unsafe { pointer.cast::<T>().drop_in_place() }
}

/// Type-erased description of a stored component.
///
/// ## Fields
/// - `type_id`: 64-bit hash of the type's printable name.
/// - `instance_type_id`: equals `type_id` for unnamed components, and
///   mixes in the instance name otherwise. Interning keys on this value.
/// - `drop_fn`: destructor for one row, or `None` when the type has no
///   destructor.

#[derive(Clone, Copy, Debug)]
pub struct ComponentDescriptor {
    /// Identity hash of the underlying type.
    pub type_id: TypeHash,

    /// Printable type name, kept for diagnostics.
    pub type_name: &'static str,

    /// Identity of this (type, name) instance; what interning keys on.
    pub instance_type_id: TypeHash,

    /// Size of one value in bytes.
    pub size: usize,

    /// Alignment of one value in bytes.
    pub align: usize,

    /// Destructor for one row of this component, if the type has one.
    pub drop_fn: Option<DropFn>,
}

impl ComponentDescriptor {
    /// Describes the unnamed instance of component type `T`.
    pub fn of<T: Component>() -> Self {
        Self::with_name::<T>(None)
    }

    /// Describes a named instance of component type `T`.
    pub fn named<T: Component>(name: &'static str) -> Self {
        Self::with_name::<T>(Some(name))
    }

    fn with_name<T: Component>(name: Option<&'static str>) -> Self {
        let type_name = type_name::<T>();
        let type_id = hash_type_name(type_name);
        Self {
            type_id,
            type_name,
            instance_type_id: hash_instance(type_id, name),
            size: size_of::<T>(),
            align: align_of::<T>(),
            drop_fn: needs_drop::<T>().then_some(drop_erased::<T> as DropFn),
        }
    }
}

impl std::fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentDescriptor {{ name: {}, size: {}, align: {} }}",
            self.type_name, self.size, self.align
        )
    }
}

/// A compile-time-known group of component values inserted atomically.
///
/// ## Contract
/// `descriptors` appends one descriptor per component in declaration
/// order, and `write_components` calls `write` exactly once per component
/// in the *same* order. Each pointer is valid only for the duration of the
/// call; the callee copies the value out and thereby takes ownership (the
/// bundle's fields are forgotten, not dropped).
pub trait Bundle {
    /// Appends this bundle's component descriptors in declaration order.
    fn descriptors(&self, out: &mut Vec<ComponentDescriptor>);

    /// Hands each component value to `write` as a raw pointer, in
    /// descriptor order, transferring ownership to the callee.
    fn write_components<F: FnMut(*const u8)>(self, write: &mut F)
    where
        Self: Sized;
}

impl<C: Component> Bundle for C {
    fn descriptors(&self, out: &mut Vec<ComponentDescriptor>) {
        out.push(ComponentDescriptor::of::<C>());
    }

    fn write_components<F: FnMut(*const u8)>(self, write: &mut F) {
        write((&self as *const C).cast::<u8>());
        std::mem::forget(self);
    }
}

/// A named instance of a component, produced by [`named`].
///
/// The wrapper only exists at bundle-composition time; the stored column
/// holds plain `C` values.
pub struct Named<C: Component> {
    name: &'static str,
    value: C,
}

/// Wraps `value` as the named component instance `name`.
///
/// ```
/// use strata_ecs::engine::component::named;
///
/// let bundle = (named("hp", 100i32), named("mp", 30i32));
/// ```
pub fn named<C: Component>(name: &'static str, value: C) -> Named<C> {
    Named { name, value }
}

impl<C: Component> Bundle for Named<C> {
    fn descriptors(&self, out: &mut Vec<ComponentDescriptor>) {
        out.push(ComponentDescriptor::named::<C>(self.name));
    }

    fn write_components<F: FnMut(*const u8)>(self, write: &mut F) {
        let Named { value, .. } = self;
        write((&value as *const C).cast::<u8>());
        std::mem::forget(value);
    }
}

macro_rules! tuple_bundle {
    ($($bundle:ident),*) => {
        #[allow(unused_variables, non_snake_case)]
        impl<$($bundle: Bundle),*> Bundle for ($($bundle,)*) {
            fn descriptors(&self, out: &mut Vec<ComponentDescriptor>) {
                let ($($bundle,)*) = self;
                $($bundle.descriptors(out);)*
            }

            fn write_components<Func: FnMut(*const u8)>(self, write: &mut Func) {
                let ($($bundle,)*) = self;
                $($bundle.write_components(&mut *write);)*
            }
        }
    };
}

tuple_bundle!();
tuple_bundle!(B0);
tuple_bundle!(B0, B1);
tuple_bundle!(B0, B1, B2);
tuple_bundle!(B0, B1, B2, B3);
tuple_bundle!(B0, B1, B2, B3, B4);
tuple_bundle!(B0, B1, B2, B3, B4, B5);
tuple_bundle!(B0, B1, B2, B3, B4, B5, B6);
tuple_bundle!(B0, B1, B2, B3, B4, B5, B6, B7);
