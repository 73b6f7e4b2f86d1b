// ─── InterfaceOficial Mods Core ───
// Mod acquisition backend: resolve, cache and install mods for one
// game version / loader pair.
//
// Architecture:
//   core/
//     version/    : loader types, version id classification
//     registry/   : Modrinth search + version lookup
//     resolver/   : required-dependency closure over a bounded task pool
//     cache/      : per version/loader artifact store
//     downloader/ : streaming temp-then-rename fetcher
//     installer/  : mods folder reconciliation
//     state/      : paths, settings, enabled-mods selection

pub mod cache;
pub mod downloader;
pub mod error;
pub mod http;
pub mod installer;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;
