//! Account: the authenticated client, every label, lookups and the label tree

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::client::MailClient;
use crate::error::{GmailError, Result};
use crate::hierarchy::{build_hierarchy, HierarchyOptions};
use crate::label::Label;
use crate::models::{BatchReport, DetailLevel};

/// Everything an [`Account`] needs besides its client
#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// Gmail user id, `me` for the authenticated user
    pub user_id: String,
    /// Fetch labels (and build the tree) in [`Account::connect`]
    pub load_labels: bool,
    pub hierarchy: HierarchyOptions,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            user_id: "me".to_string(),
            load_labels: true,
            hierarchy: HierarchyOptions::default(),
        }
    }
}

pub struct Account {
    client: Box<dyn MailClient>,
    user_id: String,
    email_address: Option<String>,
    options: HierarchyOptions,
    labels: Vec<Label>,
    labels_by_id: HashMap<String, usize>,
    labels_by_name: HashMap<String, usize>, // lowercase path -> index
    root_labels: Vec<usize>,
}

impl Account {
    /// Create an account around an already authenticated client. Nothing is fetched.
    pub fn new(client: Box<dyn MailClient>, settings: AccountSettings) -> Self {
        Self {
            client,
            user_id: settings.user_id,
            email_address: None,
            options: settings.hierarchy,
            labels: Vec::new(),
            labels_by_id: HashMap::new(),
            labels_by_name: HashMap::new(),
            root_labels: Vec::new(),
        }
    }

    /// Create an account, fetch its profile and, if configured, its labels
    pub async fn connect(client: Box<dyn MailClient>, settings: AccountSettings) -> Result<Self> {
        let load_labels = settings.load_labels;
        let mut account = Self::new(client, settings);

        let profile = account.client.get_profile(&account.user_id).await?;
        info!("Connected to account: {}", profile.email_address);
        account.email_address = Some(profile.email_address);

        if load_labels {
            account.load_labels().await?;
        }

        Ok(account)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email_address(&self) -> Option<&str> {
        self.email_address.as_deref()
    }

    pub fn client(&self) -> &dyn MailClient {
        self.client.as_ref()
    }

    pub fn hierarchy_options(&self) -> &HierarchyOptions {
        &self.options
    }

    /// Change the orphan/collision policies and rebuild the tree with them
    pub fn set_hierarchy_options(&mut self, options: HierarchyOptions) -> Result<()> {
        let previous = std::mem::replace(&mut self.options, options);
        if let Err(e) = self.rebuild_hierarchy() {
            self.options = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Load labels unless some are already held
    pub async fn ensure_labels_loaded(&mut self) -> Result<usize> {
        if self.labels.is_empty() {
            self.load_labels().await
        } else {
            Ok(self.labels.len())
        }
    }

    /// Fetch every label from the remote, replacing the flat list, both indexes
    /// and the tree. Previously loaded message lists are dropped with the old labels.
    pub async fn load_labels(&mut self) -> Result<usize> {
        let infos = self.client.list_labels(&self.user_id).await?;
        let labels: Vec<Label> = infos.into_iter().map(Label::from).collect();
        let count = labels.len();

        self.replace_labels(labels)?;
        info!("Loaded {} labels ({} top-level)", count, self.root_labels.len());
        Ok(count)
    }

    /// Re-fetch one label and rebuild indexes and tree around it
    pub async fn refresh_label(&mut self, label_id: &str) -> Result<&Label> {
        let info = self.client.get_label(&self.user_id, label_id).await?;

        let mut labels = self.labels.clone();
        match labels.iter_mut().find(|l| l.id() == info.id) {
            Some(existing) if existing.path() == info.name => {}
            Some(existing) => *existing = Label::from(info.clone()),
            None => labels.push(Label::from(info.clone())),
        }
        self.replace_labels(labels)?;

        self.label_by_id(&info.id)
            .ok_or_else(|| GmailError::LabelNotFound(info.id.clone()))
    }

    /// Install a new flat label list and derive indexes and tree from it.
    ///
    /// The tree is built before anything is replaced, so a policy error leaves the
    /// account as it was.
    pub fn replace_labels(&mut self, mut labels: Vec<Label>) -> Result<()> {
        let hierarchy = build_hierarchy(labels.iter().map(Label::path), &self.options)?;

        let ids: Vec<String> = labels.iter().map(|l| l.id().to_string()).collect();
        for (index, label) in labels.iter_mut().enumerate() {
            label.children = hierarchy
                .children(index)
                .iter()
                .map(|&child| ids[child].clone())
                .collect();
        }

        if !hierarchy.orphans().is_empty() {
            debug!(
                "{} label(s) have no parent label in the tree",
                hierarchy.orphans().len()
            );
        }

        self.labels_by_id = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.id().to_string(), index))
            .collect();
        self.labels_by_name = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.path().to_lowercase(), index))
            .collect();
        self.root_labels = hierarchy.roots().to_vec();
        self.labels = labels;
        Ok(())
    }

    /// Recompute the tree from the current flat list
    pub fn rebuild_hierarchy(&mut self) -> Result<()> {
        let labels = self.labels.clone();
        self.replace_labels(labels)
    }

    pub fn all_labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label_by_id(&self, label_id: &str) -> Option<&Label> {
        self.labels_by_id.get(label_id).map(|&i| &self.labels[i])
    }

    pub fn label_by_id_mut(&mut self, label_id: &str) -> Option<&mut Label> {
        let index = *self.labels_by_id.get(label_id)?;
        self.labels.get_mut(index)
    }

    /// Look up a label by its full path, case-insensitively
    pub fn label_by_name(&self, path: &str) -> Option<&Label> {
        self.labels_by_name
            .get(&path.trim().to_lowercase())
            .map(|&i| &self.labels[i])
    }

    pub fn label_by_name_mut(&mut self, path: &str) -> Option<&mut Label> {
        let index = *self.labels_by_name.get(&path.trim().to_lowercase())?;
        self.labels.get_mut(index)
    }

    /// Top-level labels of the current tree
    pub fn root_labels(&self) -> Vec<&Label> {
        self.root_labels.iter().map(|&i| &self.labels[i]).collect()
    }

    pub fn children_of(&self, label: &Label) -> Vec<&Label> {
        label
            .children()
            .iter()
            .filter_map(|id| self.label_by_id(id))
            .collect()
    }

    /// Depth-first walk of the tree as `(depth, label)`, roots at depth 0
    pub fn walk_hierarchy(&self) -> Vec<(usize, &Label)> {
        let mut visited = Vec::with_capacity(self.labels.len());
        let mut stack: Vec<(usize, &Label)> =
            self.root_labels().into_iter().rev().map(|l| (0, l)).collect();

        while let Some((level, label)) = stack.pop() {
            visited.push((level, label));
            for child in self.children_of(label).into_iter().rev() {
                stack.push((level + 1, child));
            }
        }

        visited
    }

    fn index_of(&self, label_id: &str) -> Result<usize> {
        self.labels_by_id
            .get(label_id)
            .copied()
            .ok_or_else(|| GmailError::LabelNotFound(label_id.to_string()))
    }

    /// List (or re-list) the messages of one label
    pub async fn load_label_messages(&mut self, label_id: &str, level: DetailLevel) -> Result<usize> {
        let index = self.index_of(label_id)?;
        let client = self.client.as_ref();
        self.labels[index]
            .load_messages(client, &self.user_id, level)
            .await
    }

    /// Bring the loaded messages of one label to `level`, continuing past messages
    /// that fail to load. Returns the number of failures.
    pub async fn load_message_contents(
        &mut self,
        label_id: &str,
        level: DetailLevel,
    ) -> Result<usize> {
        let index = self.index_of(label_id)?;
        let client = self.client.as_ref();
        self.labels[index]
            .load_message_contents(client, &self.user_id, level)
            .await
    }

    /// Trash the loaded messages of one label, continuing past individual failures
    pub async fn discard_label_messages(&self, label_id: &str) -> Result<BatchReport> {
        let index = self.index_of(label_id)?;
        self.labels[index]
            .discard_messages(self.client.as_ref(), &self.user_id)
            .await
    }

    /// Delete one label on the remote. Errors propagate; the local list is left
    /// as is until the next [`Account::load_labels`].
    pub async fn delete_label(&self, label_id: &str) -> Result<()> {
        info!("Deleting label {}", label_id);
        Label::delete(self.client.as_ref(), &self.user_id, label_id).await
    }

    /// Delete labels by path, one at a time. A missing label or a failed delete is
    /// recorded and the next one is attempted.
    pub async fn delete_labels<S: AsRef<str>>(&self, paths: &[S]) -> BatchReport {
        let mut report = BatchReport::new();

        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }

            let outcome = match self.label_by_name(path) {
                Some(label) => {
                    info!("Deleting label, name={}, ID={}", label.path(), label.id());
                    Label::delete(self.client.as_ref(), &self.user_id, label.id()).await
                }
                None => Err(GmailError::LabelNotFound(path.to_string())),
            };

            if let Err(e) = &outcome {
                warn!("Failed to delete label {}: {}", path, e);
            }
            report.record(path, outcome);
        }

        report
    }

    /// Load and trash the messages of each label listed by path.
    ///
    /// Messages are listed at `IdOnly` and then brought to `level` one by one for
    /// logging; a message whose content cannot be fetched is still trashed.
    /// Message outcomes are recorded under the message id. A label that cannot be
    /// found or listed is recorded under its path, and the next label is attempted.
    pub async fn discard_messages_in_labels<S: AsRef<str>>(
        &mut self,
        paths: &[S],
        level: DetailLevel,
    ) -> BatchReport {
        let mut report = BatchReport::new();

        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }

            let Some(label_id) = self.label_by_name(path).map(|l| l.id().to_string()) else {
                warn!("Label {} not found", path);
                report.record(path, Err(GmailError::LabelNotFound(path.to_string())));
                continue;
            };

            info!("Loading messages to discard for label {}", path);
            match self.load_label_messages(&label_id, DetailLevel::IdOnly).await {
                Ok(count) => info!("Discarding {} messages in label {}", count, path),
                Err(e) => {
                    warn!("Failed to list messages for label {}: {}", path, e);
                    report.record(path, Err(e));
                    continue;
                }
            }
            if let Err(e) = self.load_message_contents(&label_id, level).await {
                warn!("Failed to load message contents for label {}: {}", path, e);
            }

            match self.discard_label_messages(&label_id).await {
                Ok(label_report) => report.merge(label_report),
                Err(e) => report.record(path, Err(e)),
            }
        }

        report
    }

    /// Count the messages of every label in walk order, loading each list at
    /// `IdOnly`. A label whose short name matches an entry of `skip` (ignoring
    /// case) is left out together with everything below it; a label that fails to
    /// list is reported and the walk goes on.
    pub async fn message_counts<S: AsRef<str>>(&mut self, skip: &[S]) -> Vec<LabelCount> {
        let walk: Vec<(usize, String, String)> = self
            .walk_hierarchy()
            .into_iter()
            .map(|(depth, label)| (depth, label.id().to_string(), label.path().to_string()))
            .collect();

        let mut counts = Vec::with_capacity(walk.len());
        let mut skipped_depth: Option<usize> = None;
        for (depth, label_id, path) in walk {
            // Preorder: a skipped label's subtree is the run of deeper entries after it
            match skipped_depth {
                Some(d) if depth > d => continue,
                _ => skipped_depth = None,
            }

            let short_name = crate::hierarchy::short_name(&path);
            if skip.iter().any(|s| s.as_ref().eq_ignore_ascii_case(short_name)) {
                debug!("Skipping label {} and its children", path);
                skipped_depth = Some(depth);
                continue;
            }

            let count = self
                .load_label_messages(&label_id, DetailLevel::IdOnly)
                .await;
            if let Err(e) = &count {
                warn!("Failed to count messages for label {}: {}", path, e);
            }
            counts.push(LabelCount {
                depth,
                label_id,
                path,
                count,
            });
        }

        counts
    }
}

/// One row of [`Account::message_counts`]
#[derive(Debug)]
pub struct LabelCount {
    pub depth: usize,
    pub label_id: String,
    pub path: String,
    pub count: Result<usize>,
}
