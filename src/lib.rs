// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Incremental semantic highlighting for editors backed by a type-resolution pass.

pub mod editor;
pub mod semantic;
