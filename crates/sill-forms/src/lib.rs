//! SILL Forms: multi-step wizards and autocomplete
//!
//! The three forms of the catalog share one state machine, [`Wizard`],
//! instantiated with a schema each:
//!
//! | Form | Steps | Persists through |
//! |---|---|---|
//! | [`SoftwareForm`] | type, identity, prerogatives, similar software | `create_software` / `update_software` |
//! | [`InstanceForm`] | softwares, organization | `create_instance` / `update_instance` |
//! | [`DeclarationForm`] | type, details | `create_user_or_referent` |
//!
//! A successful submit resets the wizard and yields a [`Redirect`] to the
//! detail page of the software concerned.

pub mod autocomplete;
pub mod declaration;
pub mod instance;
pub mod software;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod testutil;

pub use autocomplete::{Autocomplete, Lookup};
pub use declaration::{DeclarationDraft, DeclarationForm, DeclarationStep, DeclarationType};
pub use instance::{
    InstanceDraft, InstanceForm, InstanceFormParams, InstanceOrganization, InstanceSoftwares,
    InstanceStep,
};
pub use software::{
    autofill_identity, SoftwareDraft, SoftwareForm, SoftwareFormParams, SoftwareIdentity,
    SoftwarePrerogatives, SoftwareStep,
};
pub use wizard::{FormSchema, ReadyState, Redirect, SubmitOutcome, Wizard, WizardState};
