//! Read-only Vulkan registry lookups.
//!
//! The merge engine needs three facts about every struct it sees: which other
//! names alias it, which core version or extensions define it, and how each of
//! its members is combined. This crate models those facts and loads them from
//! a JSON snapshot of the registry.

mod error;
mod limit;
mod model;
mod snapshot;

pub use error::RegistryError;
pub use limit::LimitType;
pub use model::{vendor_tag, ExtensionDef, MemberDef, StructDef, VersionNumber};
pub use snapshot::RegistrySnapshot;

/// Lookup service over registry metadata.
pub trait Registry {
    /// Definition of a struct by name.
    fn struct_def(&self, name: &str) -> Option<&StructDef>;

    /// Definition of an extension by name.
    fn extension(&self, name: &str) -> Option<&ExtensionDef>;

    /// Alias names of a struct (empty when unknown).
    fn aliases(&self, name: &str) -> &[String] {
        self.struct_def(name)
            .map(|def| def.aliases.as_slice())
            .unwrap_or(&[])
    }

    /// Extensions that define a struct (empty when unknown).
    fn defined_by_extensions(&self, name: &str) -> &[String] {
        self.struct_def(name)
            .map(|def| def.defined_by_extensions.as_slice())
            .unwrap_or(&[])
    }

    /// Core version defining a struct, falling back to the first alias that
    /// has one.
    fn defined_by_version(&self, name: &str) -> Option<VersionNumber> {
        let def = self.struct_def(name)?;
        def.defined_by_version.or_else(|| {
            def.aliases
                .iter()
                .find_map(|alias| self.struct_def(alias)?.defined_by_version)
        })
    }

    /// Member definition, falling back to the members of an alias.
    fn member(&self, struct_name: &str, member: &str) -> Option<&MemberDef> {
        let def = self.struct_def(struct_name)?;
        def.members.get(member).or_else(|| {
            def.aliases
                .iter()
                .find_map(|alias| self.struct_def(alias)?.members.get(member))
        })
    }
}
