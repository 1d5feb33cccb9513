//! Core of a conversational language-practice assistant: a per-message
//! inference pipeline, activity analytics, and a spaced-repetition
//! vocabulary trainer, in a strictly linted crate.

// Interdiction stricte de pratiques dangereuses ou non idiomatiques
#![deny(warnings)] // Tous les warnings sont traités comme des erreurs
#![deny(unsafe_code)] // Le code unsafe est interdit
#![deny(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(dead_code)] // Le code inutilisé est interdit
#![deny(non_camel_case_types)]
// Les types doivent suivre la convention CamelCase (exception explicite possible au besoin)

// Options supplémentaires pour ne rien laisser passer
#![deny(unused_imports)] // Les imports inutilisés sont interdits
#![deny(unused_variables)] // Les variables inutilisés sont interdits
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(non_snake_case)] // Les noms de variables et fonctions doivent être en snake_case
#![deny(non_upper_case_globals)] // Les constantes et globals doivent être en MAJUSCULE
#![deny(nonstandard_style)] // Empêche tout style de code non standard
#![forbid(unsafe_op_in_unsafe_fn)]
// Interdit l'utilisation d'unsafe même dans une fonction unsafe

// Clippy pour stricte discipline
#![deny(clippy::all)] // Active toutes les lints Clippy standard
#![deny(clippy::unwrap_used)] // Interdit unwrap()
#![deny(clippy::expect_used)] // Interdit expect()
#![deny(clippy::panic)] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::unimplemented)] // Interdit les fonctions non implémentées
#![deny(clippy::module_inception)] // Interdit un module ayant le même nom que le crate
#![deny(clippy::redundant_clone)] // Interdit les clones inutiles

// Lints pour sécurité et robustesse
#![deny(overflowing_literals)] // Interdit les littéraux qui débordent

/// Activity analytics: daily counters, streaks, error classification.
pub mod analytics;
/// Environment-driven application configuration.
pub mod config;
/// Per-user conversation history and learner profile.
pub mod context;
/// Boundary to the external AI inference provider.
pub mod gateway;
/// Identifier newtypes shared across the core.
pub mod ids;
/// Per-message orchestration: voice and text pipelines.
pub mod pipeline;
/// Entry helpers to start the coach runtime.
pub mod start_coach;
/// Per-user JSON document persistence.
pub mod storage;
/// Best-effort forwarding of analytics events to a remote service.
pub mod sync;
/// Spaced-repetition vocabulary scheduler.
pub mod vocabulary;
