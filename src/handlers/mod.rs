// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Elevated (access token + admin profile role)
pub mod public;   // Tier 1: service info, health, /ensure-admin
pub mod elevated; // Tier 2: admin-only diagnostics (/api/roles/*)

/*
TIER NOTES:

/ensure-admin takes no input. The admin email comes from configuration
only, and the handler writes nothing but that account's role.

Elevated routes sit behind require_admin_middleware, which checks the
token's subject against the profiles table. Token claims and provider
metadata never grant admin on their own.
*/
