// Credential Hashing Policy
//
// Password digests under an explicit, auditable parameter set.
//
// - policy: algorithms, modes, floors and the validated HashPolicy value
// - compute: digest computation, verification and the pre-hash helper
//
// SAFE mode enforces an input ceiling, a fresh 16-byte salt and a work factor
// at or above the floor. The two UNSAFE modes reproduce the original defects
// byte-for-byte: a shared static salt, a sub-floor work factor, and no length
// check at all.

pub mod compute;
pub mod policy;

pub use compute::*;
pub use policy::*;
