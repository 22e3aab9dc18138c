//! The per-changeset feature row and its column layout.

use crate::changeset::Changeset;
use crate::classify::classify;
use crate::error::Result;
use crate::profiles::ContributorProfile;

/// Output columns in the order they may appear in a feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ChangesetId,
    Harmful,
    FeaturesCreated,
    FeaturesModified,
    FeaturesDeleted,
    UserId,
    UserName,
    UserChangesets,
    UserFeatures,
    ChangesetBboxArea,
}

impl Column {
    pub const BASE: [Column; 5] = [
        Column::ChangesetId,
        Column::Harmful,
        Column::FeaturesCreated,
        Column::FeaturesModified,
        Column::FeaturesDeleted,
    ];

    pub const CONTRIBUTOR: [Column; 4] = [
        Column::UserId,
        Column::UserName,
        Column::UserChangesets,
        Column::UserFeatures,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::ChangesetId => "changeset_id",
            Column::Harmful => "harmful",
            Column::FeaturesCreated => "features_created",
            Column::FeaturesModified => "features_modified",
            Column::FeaturesDeleted => "features_deleted",
            Column::UserId => "user_id",
            Column::UserName => "user_name",
            Column::UserChangesets => "user_changesets",
            Column::UserFeatures => "user_features",
            Column::ChangesetBboxArea => "changeset_bbox_area",
        }
    }
}

/// Feature vector for one changeset. `None` fields serialize as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    pub changeset_id: String,
    pub harmful: Option<bool>,
    pub features_created: usize,
    pub features_modified: usize,
    pub features_deleted: usize,

    // contributor enrichment
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_changesets: Option<u64>,
    pub user_features: Option<u64>,

    // geometry enrichment
    pub changeset_bbox_area: Option<f64>,
}

impl FeatureRow {
    /// Counts created, modified and deleted features.
    ///
    /// # Errors
    ///
    /// Fails if a modified or deleted feature cannot be paired with its
    /// previous version.
    pub fn from_changeset(changeset: &Changeset) -> Result<Self> {
        let (created, modified, deleted) = classify(changeset)?.counts();

        Ok(FeatureRow {
            changeset_id: changeset.id.clone(),
            features_created: created,
            features_modified: modified,
            features_deleted: deleted,
            ..Default::default()
        })
    }

    pub fn with_label(mut self, harmful: Option<bool>) -> Self {
        self.harmful = harmful;
        self
    }

    pub fn with_contributor(mut self, changeset: &Changeset, profile: &ContributorProfile) -> Self {
        self.user_id = changeset.uid.clone();
        self.user_name = changeset.username.clone();
        self.user_changesets = profile.changeset_count;
        self.user_features = profile.num_changes;
        self
    }

    pub fn with_bbox_area(mut self, area_km2: Option<f64>) -> Self {
        self.changeset_bbox_area = area_km2;
        self
    }

    /// Serialized value of `column`, or `None` when unknown.
    pub fn field(&self, column: Column) -> Option<String> {
        match column {
            Column::ChangesetId => Some(self.changeset_id.clone()),
            Column::Harmful => self
                .harmful
                .map(|h| if h { "True" } else { "False" }.to_string()),
            Column::FeaturesCreated => Some(self.features_created.to_string()),
            Column::FeaturesModified => Some(self.features_modified.to_string()),
            Column::FeaturesDeleted => Some(self.features_deleted.to_string()),
            Column::UserId => self.user_id.clone(),
            Column::UserName => self.user_name.clone(),
            Column::UserChangesets => self.user_changesets.map(|n| n.to_string()),
            Column::UserFeatures => self.user_features.map(|n| n.to_string()),
            Column::ChangesetBboxArea => self.changeset_bbox_area.map(|a| a.to_string()),
        }
    }
}
