// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod simulated;
pub mod traits;

pub use traits::{
    ClientError, Dialog, DialogKind, FieldError, FormHandle, Interaction, PageId,
    SessionConnector, UiSession,
};
