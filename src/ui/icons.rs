//! Run-log icons with plain-text fallbacks for terminals without emoji.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP]");

// Issue list
pub static CLIPBOARD: Emoji<'_, '_> = Emoji("📋 ", "");
pub static GENERIC: Emoji<'_, '_> = Emoji("🔄 ", "[~]");

// Fix lifecycle
pub static WRENCH: Emoji<'_, '_> = Emoji("🔧 ", "[FIX]");
pub static BRANCH: Emoji<'_, '_> = Emoji("🌿 ", "->");
pub static PROGRESS: Emoji<'_, '_> = Emoji("📊 ", "[SUM]");
