//! Items.
//!
//! An item is a credential record: fields (username, password, custom
//! fields), sections grouping custom fields, URLs and tags. Local edits have
//! no effect until [`Item::save`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::client::Client;
use crate::core::command::Command;
use crate::core::decode::{Attach, ClientRef};
use crate::error::{Result, ValidationError};

/// Item category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Login,
    Password,
    SecureNote,
    Identity,
    ApiCredential,
    CreditCard,
    Database,
    Server,
    SshKey,
    Document,
    #[serde(untagged)]
    Other(String),
}

impl Category {
    /// Wire name, e.g. `SECURE_NOTE`.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Login => "LOGIN",
            Category::Password => "PASSWORD",
            Category::SecureNote => "SECURE_NOTE",
            Category::Identity => "IDENTITY",
            Category::ApiCredential => "API_CREDENTIAL",
            Category::CreditCard => "CREDIT_CARD",
            Category::Database => "DATABASE",
            Category::Server => "SERVER",
            Category::SshKey => "SSH_KEY",
            Category::Document => "DOCUMENT",
            Category::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    Concealed,
    Email,
    Url,
    Otp,
    Date,
    Phone,
    #[serde(untagged)]
    Other(std::string::String),
}

/// Built-in role of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldPurpose {
    Username,
    Password,
    Notes,
}

impl FieldPurpose {
    fn field_id(self) -> &'static str {
        match self {
            FieldPurpose::Username => "username",
            FieldPurpose::Password => "password",
            FieldPurpose::Notes => "notesPlain",
        }
    }

    fn field_type(self) -> FieldType {
        match self {
            FieldPurpose::Password => FieldType::Concealed,
            FieldPurpose::Username | FieldPurpose::Notes => FieldType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUrl {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default)]
    pub primary: bool,
    pub href: String,
}

/// A section of an item. Sections compare by value (id and label), so a
/// section decoded from `op` matches one built locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Section {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<FieldPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_details: Option<PasswordDetails>,
}

/// Vault summary embedded in an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub vault: VaultRef,
    pub category: Category,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_edited_by: String,
    #[serde(
        default,
        rename = "additional_information",
        skip_serializing_if = "String::is_empty"
    )]
    pub additional_info: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<ItemUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip)]
    client: ClientRef,
}

impl Attach for Item {
    fn attach(&mut self, client: &Client) {
        self.client.set(client);
    }
}

impl Item {
    /// A new, unsaved item in `vault`.
    pub fn new(title: impl Into<String>, category: Category, vault: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            vault: VaultRef {
                id: vault.into(),
                name: String::new(),
            },
            category,
            last_edited_by: String::new(),
            additional_info: String::new(),
            favorite: false,
            version: 0,
            created_at: None,
            updated_at: None,
            tags: Vec::new(),
            urls: Vec::new(),
            sections: Vec::new(),
            fields: Vec::new(),
            client: ClientRef::default(),
        }
    }

    /// The client this item was fetched through.
    pub fn client(&self) -> Option<&Client> {
        self.client.get()
    }

    // --- Built-in fields ---
    pub fn username(&self) -> Option<&str> {
        self.purpose_value(FieldPurpose::Username)
    }

    pub fn password(&self) -> Option<&str> {
        self.purpose_value(FieldPurpose::Password)
    }

    pub fn notes(&self) -> Option<&str> {
        self.purpose_value(FieldPurpose::Notes)
    }

    /// Set the username, updating the existing username field if any.
    pub fn set_username(&mut self, value: impl Into<String>) {
        self.upsert_purpose(FieldPurpose::Username, value.into());
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.upsert_purpose(FieldPurpose::Password, value.into());
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.upsert_purpose(FieldPurpose::Notes, value.into());
    }

    fn purpose_value(&self, purpose: FieldPurpose) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.purpose == Some(purpose))
            .and_then(|f| f.value.as_deref())
    }

    fn upsert_purpose(&mut self, purpose: FieldPurpose, value: String) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.purpose == Some(purpose)) {
            field.value = Some(value);
            return;
        }
        let id = purpose.field_id();
        self.fields.push(Field {
            id: id.to_string(),
            label: id.to_string(),
            value: Some(value),
            reference: String::new(),
            kind: purpose.field_type(),
            purpose: Some(purpose),
            section: None,
            password_details: None,
        });
    }

    // --- URLs ---
    /// Add a URL, or update the label of an existing one with the same
    /// href. A primary URL demotes the others.
    pub fn add_url(&mut self, href: impl Into<String>, label: impl Into<String>, primary: bool) {
        let href = href.into();
        if primary {
            for url in &mut self.urls {
                url.primary = false;
            }
        }
        let primary = primary || self.urls.is_empty();
        match self.urls.iter_mut().find(|u| u.href == href) {
            Some(url) => {
                url.label = label.into();
                url.primary |= primary;
            }
            None => self.urls.push(ItemUrl {
                label: label.into(),
                primary,
                href,
            }),
        }
    }

    /// Remove the URL with this href.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LastUrl` when it is the item's only URL:
    /// `op item edit` cannot clear the last URL, so the edit is refused
    /// before reaching it.
    pub fn delete_url(&mut self, href: &str) -> Result<()> {
        let pos = self
            .urls
            .iter()
            .position(|u| u.href == href)
            .ok_or_else(|| ValidationError::UrlNotFound(href.to_string()))?;
        if self.urls.len() == 1 {
            return Err(ValidationError::LastUrl.into());
        }
        let removed = self.urls.remove(pos);
        if removed.primary {
            if let Some(first) = self.urls.first_mut() {
                first.primary = true;
            }
        }
        Ok(())
    }

    // --- Tags ---
    /// Add a tag. Returns false if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove a tag. Returns false if it was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    // --- Sections ---
    /// Add a section labelled `label`, or return the existing one.
    pub fn add_section(&mut self, label: &str) -> Section {
        if let Some(existing) = self
            .sections
            .iter()
            .find(|s| s.label.as_deref() == Some(label))
        {
            return existing.clone();
        }
        let section = Section::new(slug(label), label);
        self.sections.push(section.clone());
        section
    }

    /// Fields belonging to `section`.
    pub fn section_fields<'a>(&'a self, section: &'a Section) -> impl Iterator<Item = &'a Field> {
        self.fields
            .iter()
            .filter(move |f| f.section.as_ref() == Some(section))
    }

    /// Add (or update) a custom field inside `section`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::SectionNotFound` if the section is not part
    /// of this item.
    pub fn add_field_to_section(
        &mut self,
        section: &Section,
        label: &str,
        value: impl Into<String>,
        kind: FieldType,
    ) -> Result<&Field> {
        if !self.sections.contains(section) {
            return Err(ValidationError::SectionNotFound(section.id.clone()).into());
        }
        let value = value.into();

        let pos = self
            .fields
            .iter()
            .position(|f| f.section.as_ref() == Some(section) && f.label == label);
        let pos = match pos {
            Some(pos) => {
                let field = &mut self.fields[pos];
                field.value = Some(value);
                field.kind = kind;
                pos
            }
            None => {
                self.fields.push(Field {
                    id: format!("{}.{}", section.id, slug(label)),
                    label: label.to_string(),
                    value: Some(value),
                    reference: String::new(),
                    kind,
                    purpose: None,
                    section: Some(section.clone()),
                    password_details: None,
                });
                self.fields.len() - 1
            }
        };
        Ok(&self.fields[pos])
    }

    /// Remove the field with `field_id` from `section`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::FieldNotFound` if no field in that section
    /// has the id.
    pub fn delete_field_from_section(&mut self, field_id: &str, section: &Section) -> Result<()> {
        let pos = self
            .fields
            .iter()
            .position(|f| f.id == field_id && f.section.as_ref() == Some(section))
            .ok_or_else(|| ValidationError::FieldNotFound(field_id.to_string()))?;
        self.fields.remove(pos);
        Ok(())
    }

    // --- Remote ---
    /// Push local changes to 1Password and refresh this item from the
    /// result. Unsaved items are created.
    ///
    /// # Errors
    ///
    /// Returns `Error::Detached` for items not obtained through a client.
    pub fn save(&mut self) -> Result<()> {
        let client = self.client.require()?.clone();
        let saved = if self.id.is_empty() {
            client.create_item(self, false)?
        } else {
            client.update_item(self)?
        };
        *self = saved;
        Ok(())
    }

    /// Delete this item from 1Password. The local value is left as-is.
    pub fn delete(&self) -> Result<()> {
        self.client.require()?.delete_item(&self.id)
    }

    /// Attach a client to a locally built item so it can be saved.
    pub fn with_client(mut self, client: &Client) -> Self {
        self.client.set(client);
        self
    }
}

fn slug(label: &str) -> String {
    let slug: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

impl Client {
    /// Items in a vault, or in every vault the account can see.
    ///
    /// `op item list` returns summaries; fetch an item for its fields.
    pub fn list_items(&self, vault: Option<&str>) -> Result<Vec<Item>> {
        let mut cmd = Command::new(["item", "list"]);
        if let Some(vault) = vault {
            cmd = cmd.args(["--vault", vault]);
        }
        self.query_list(cmd)
    }

    /// Full item by id or title.
    pub fn item(&self, identifier: &str, vault: Option<&str>) -> Result<Item> {
        let mut cmd = Command::new(["item", "get", identifier]);
        if let Some(vault) = vault {
            cmd = cmd.args(["--vault", vault]);
        }
        self.query(cmd)
    }

    /// Create an item from a full record sent on stdin.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ItemIdNotEmpty` if the item already has an
    /// id.
    pub fn create_item(&self, item: &Item, generate_password: bool) -> Result<Item> {
        if !item.id.is_empty() {
            return Err(ValidationError::ItemIdNotEmpty.into());
        }
        debug!(title = %item.title, "creating item");

        let mut cmd = Command::new(["item", "create"]);
        if generate_password {
            cmd = cmd.args(["--generate-password"]);
        }
        self.query(cmd.payload(item)?)
    }

    /// Replace an item with the given record.
    pub fn update_item(&self, item: &Item) -> Result<Item> {
        if item.id.is_empty() {
            return Err(ValidationError::Empty("item ID").into());
        }
        debug!(id = %item.id, "updating item");
        self.query(Command::new(["item", "edit", item.id.as_str()]).payload(item)?)
    }

    pub fn delete_item(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(ValidationError::Empty("item ID").into());
        }
        self.run(Command::new(["item", "delete", id]))?;
        Ok(())
    }
}
