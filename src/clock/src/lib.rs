//! Clock tree for the Loongson-1 family of MIPS systems-on-chip.
//!
//! The tree is built as data ([`tree::ClockTree`]), ordered parents-first, and
//! registered into a [`registry::Registry`]. Registration derives each clock's
//! rate exactly once from its parent's rate and the live clock registers.

#![cfg_attr(not(test), no_std)]
#![deny(
    clippy::debug_assert_with_mut_call,
    clippy::float_arithmetic,
    clippy::as_conversions,
    stable_features
)]
#![warn(
    clippy::cargo,
    clippy::pedantic,
    clippy::undocumented_unsafe_blocks,
    clippy::semicolon_inside_block,
    clippy::semicolon_if_nothing_returned,
    unsafe_op_in_unsafe_fn
)]
#![allow(
    clippy::cargo_common_metadata,
    clippy::enum_glob_use,
    clippy::inline_always,
    clippy::items_after_statements,
    clippy::must_use_candidate,
    clippy::unreadable_literal,
    clippy::wildcard_imports,
    clippy::upper_case_acronyms,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

pub mod boot;
pub mod hw;
pub mod logging;
pub mod params;
pub mod registry;
pub mod time;
pub mod tree;
pub mod variant;

#[macro_use]
extern crate bitflags;

#[macro_use]
extern crate log;

#[doc(hidden)]
pub extern crate paste;

#[macro_use]
extern crate thiserror;

pub use registry::{Clock, DeviceId, Registry, get_rate, lookup_clock};
pub use variant::Variant;

#[macro_export]
macro_rules! singleton {
    (
        $(#[$struct_attrs:meta])*
        $struct_scope:vis $struct_name:ident {
            $(
                $(#[$field_attrs:meta])*
                $scope:vis $field_name:ident: $field_ty:ty,
            )*
        }

        $(#[$init_attrs:meta])*
        fn init($($arg_name:ident: $arg_ty:ty),*)
            $init:block
    ) => {
        $crate::paste::paste! {
            #[allow(non_upper_case_globals)]
            static [< STATIC_ $struct_name >]: spin::Once<$struct_name> = spin::Once::new();

            $(#[$struct_attrs])*
            $struct_scope struct $struct_name {
                $(
                    $(#[$field_attrs])*
                    $scope $field_name: $field_ty
                ),*
            }

            impl $struct_name {
                $(#[$init_attrs])*
                ///
                /// Subsequent calls after the first do nothing.
                pub fn init($($arg_name: $arg_ty),*) {
                    [< STATIC_ $struct_name >].call_once(||{
                        trace!(concat!("Initializing `", stringify!($struct_name), "`..."));

                        let init = $init;

                        debug!(concat!("Static `", stringify!($struct_name), "` initialized."));

                        init
                    });
                }

                /// Gets the single instance of [`Self`], or causes a panic if it's uninitialized.
                fn get_static() -> &'static Self {
                    [< STATIC_ $struct_name >]
                        .get()
                        .expect(concat!(
                            "static `",
                            stringify!($struct_name),
                            "` has not yet been initialized"
                        ))
                }

                /// Whether the singleton has been initialized.
                pub fn is_initialized() -> bool {
                    [< STATIC_ $struct_name >].get().is_some()
                }
            }
        }
    };
}
