// handlers/elevated/mod.rs - Elevated handlers (admin access token required)
//
// Security Level: bearer access token + profile role "admin"
// Route Prefix: /api/*
// Middleware: require_admin_middleware (applied as a route layer in server.rs)

pub mod roles; // Role consistency diagnostics
