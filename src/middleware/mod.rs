/*
 * Responsibility
 * - middleware public interface
 * - http: request id / access log / body limit / global timeout
 * - auth: authorization backend in front of protected routes
 */
pub mod auth;
pub mod http;
