//! Administrative group management, driven by the CLI.

use anyhow::bail;
use tracing::info;

use crate::Repositories;
use crate::domain::group::{Group, NewGroup, TITLE_MAX_LEN};

/// Group administration against a store that outlives the process.
///
/// The in-memory store dies with the CLI process, so changes made through it
/// would be lost before any server could see them.
pub struct GroupAdmin {
    repos: Repositories,
}

impl GroupAdmin {
    pub fn new(repos: Repositories, persistent: bool) -> anyhow::Result<Self> {
        if !persistent {
            bail!("create-group/delete-group need DATABASE_URL");
        }
        Ok(Self { repos })
    }

    pub async fn create_group(&self, group: NewGroup) -> anyhow::Result<Group> {
        if group.title.trim().is_empty() || group.title.chars().count() > TITLE_MAX_LEN {
            bail!("title must be 1 to {TITLE_MAX_LEN} characters");
        }
        let group = self.repos.groups.create(group).await?;
        info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    pub async fn delete_group(&self, slug: &str) -> anyhow::Result<()> {
        if !self.repos.groups.delete_by_slug(slug).await? {
            bail!("group not found: {slug}");
        }
        info!(slug = %slug, "group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;

    fn new_group(title: &str) -> NewGroup {
        NewGroup {
            title: title.into(),
            slug: "test_slug".into(),
            description: "Test description".into(),
        }
    }

    #[test]
    fn refuses_a_store_that_does_not_persist() {
        let repos = Repositories::in_memory(InMemoryStore::new());
        let err = GroupAdmin::new(repos, false).err().unwrap();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[tokio::test]
    async fn creates_and_deletes_groups() {
        let repos = Repositories::in_memory(InMemoryStore::new());
        let admin = GroupAdmin::new(repos.clone(), true).unwrap();

        let group = admin.create_group(new_group("Test group")).await.unwrap();
        assert_eq!(repos.groups.find_by_slug("test_slug").await.unwrap(), Some(group));

        assert!(admin.create_group(new_group("  ")).await.is_err());
        admin.delete_group("test_slug").await.unwrap();
        assert!(admin.delete_group("test_slug").await.is_err());
    }
}
