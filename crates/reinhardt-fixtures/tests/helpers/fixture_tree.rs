//! Temporary fixtures directories.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Fixtures root on disk, removed when dropped.
pub struct FixtureTree {
	root: TempDir,
}

impl FixtureTree {
	pub fn new() -> Self {
		Self {
			root: TempDir::new().unwrap(),
		}
	}

	/// Writes `content` to `relative`, creating parent directories.
	pub fn file(self, relative: &str, content: &str) -> Self {
		let path = self.root.path().join(relative);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap();
		}
		fs::write(path, content).unwrap();
		self
	}

	pub fn path(&self) -> &Path {
		self.root.path()
	}
}

/// The users/orders tree: `order1` references `user1`.
pub fn users_and_orders() -> FixtureTree {
	FixtureTree::new()
		.file(
			"users/user1.yml",
			r#"
entity: User
items:
  user1:
    id: 1
    email: alice@example.com
"#,
		)
		.file(
			"orders/order1.yml",
			r#"
entity: Order
items:
  order1:
    id: 10
    user_id: "@user1"
"#,
		)
}
