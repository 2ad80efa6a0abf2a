pub struct Icons;

impl Icons {
    pub const BUILDING: &str = "🏢";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const DATABASE: &str = "🗄️";
    pub const PIN: &str = "📍";
    pub const NEW: &str = "✨";
    pub const DEL: &str = "🗑️";
}
