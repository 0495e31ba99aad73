// Copyright 2019-2026 Forest Messager Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Static admin-command permission table (§6, §9 "reflection-based
//! permission proxy"). The teacher's source wraps every admin method with a
//! reflective permission check; here the table is built once and consulted
//! by the dispatcher before invocation, with no runtime method synthesis.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Permission {
    Read,
    Write,
    Admin,
}

/// `method → required permission`. `Admin` is required for anything not
/// explicitly listed under `read` or `write` in §6.
pub fn required_permission(method: &str) -> Permission {
    match method {
        "PushMessage" | "PushMessageWithId" | "ForcePushMessageWithId" => Permission::Write,
        "WaitMessage"
        | "GetMessageByUid"
        | "HasMessageByUid"
        | "GetMessageBySignedCid"
        | "GetMessageByUnsignedCid"
        | "GetMessageByFromAndNonce"
        | "WalletHas"
        | "HasAddress" => Permission::Read,
        _ => Permission::Admin,
    }
}

/// Returns `true` when `granted` satisfies `required` under the
/// `read < write < admin` ordering.
pub fn satisfies(granted: Permission, required: Permission) -> bool {
    granted >= required
}
