// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::gateway::GatewayError;

/// Failure of a service operation. The wrapped gateway error has already been logged and shown
/// as an alert by the time callers see this.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to fetch: {0}")]
    FetchFailed(#[source] GatewayError),
    #[error("failed to save: {0}")]
    SaveFailed(#[source] GatewayError),
    #[error("failed to delete: {0}")]
    DeleteFailed(#[source] GatewayError),
}

impl ServiceError {
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::FetchFailed(err) | Self::SaveFailed(err) | Self::DeleteFailed(err) => err,
        }
    }
}
