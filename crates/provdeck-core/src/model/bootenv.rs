// ── Boot environments: netboot recipes ──

use provdeck_api::types::{BootEnv, OsInfo, TemplateInfo};

use super::Resource;
use crate::draft::Draft;
use crate::error::CoreError;
use crate::field::FieldValue;

impl Resource for BootEnv {
    const KIND: &'static str = "bootenvs";
    const NOUN: &'static str = "boot environment";

    type Template = BootEnvTemplate;

    fn key(&self) -> Option<String> {
        if self.name.is_empty() {
            None
        } else {
            Some(self.name.clone())
        }
    }

    fn default_draft() -> Self {
        BootEnv {
            name: String::new(),
            description: String::new(),
            os: OsInfo::default(),
            templates: Vec::new(),
            kernel: String::new(),
            initrds: Vec::new(),
            boot_params: String::new(),
            required_params: Vec::new(),
            validated: false,
            // a brand-new recipe has nothing to be unavailable about
            available: true,
            errors: Vec::new(),
        }
    }

    fn apply_template(&mut self, template: &BootEnvTemplate) {
        if let Some(name) = &template.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &template.description {
            self.description.clone_from(description);
        }
        if let Some(os) = &template.os {
            self.os.clone_from(os);
        }
        if let Some(templates) = &template.templates {
            self.templates.clone_from(templates);
        }
        if let Some(kernel) = &template.kernel {
            self.kernel.clone_from(kernel);
        }
        if let Some(initrds) = &template.initrds {
            self.initrds.clone_from(initrds);
        }
        if let Some(boot_params) = &template.boot_params {
            self.boot_params.clone_from(boot_params);
        }
        if let Some(required_params) = &template.required_params {
            self.required_params.clone_from(required_params);
        }
        if let Some(validated) = template.validated {
            self.validated = validated;
        }
        if let Some(available) = template.available {
            self.available = available;
        }
        if let Some(errors) = &template.errors {
            self.errors.clone_from(errors);
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "Name" => self.name = value.into_text(),
            "Description" => self.description = value.into_text(),
            "Kernel" => self.kernel = value.into_text(),
            "BootParams" => self.boot_params = value.into_text(),
            other => {
                return Err(CoreError::NotEditable {
                    noun: Self::NOUN,
                    field: other.to_owned(),
                });
            }
        }
        Ok(())
    }

    fn is_key_field(field: &str) -> bool {
        field == "Name"
    }
}

/// Partial boot environment used to seed new rows.
#[derive(Debug, Clone, Default)]
pub struct BootEnvTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub os: Option<OsInfo>,
    pub templates: Option<Vec<TemplateInfo>>,
    pub kernel: Option<String>,
    pub initrds: Option<Vec<String>>,
    pub boot_params: Option<String>,
    pub required_params: Option<Vec<String>>,
    pub validated: Option<bool>,
    pub available: Option<bool>,
    pub errors: Option<Vec<String>>,
}

impl From<&BootEnv> for BootEnvTemplate {
    /// Full-copy template, as used by the row copy button. Validation
    /// state comes along so the copy displays like its source until it
    /// is saved and the server re-validates.
    fn from(bootenv: &BootEnv) -> Self {
        Self {
            name: Some(bootenv.name.clone()),
            description: Some(bootenv.description.clone()),
            os: Some(bootenv.os.clone()),
            templates: Some(bootenv.templates.clone()),
            kernel: Some(bootenv.kernel.clone()),
            initrds: Some(bootenv.initrds.clone()),
            boot_params: Some(bootenv.boot_params.clone()),
            required_params: Some(bootenv.required_params.clone()),
            validated: Some(bootenv.validated),
            available: Some(bootenv.available),
            errors: Some(bootenv.errors.clone()),
        }
    }
}

// Sub-entity edits for the expanded row editor. Each one marks the
// draft edited, same as a scalar field change.
impl Draft<BootEnv> {
    /// Append an empty template row.
    pub fn add_template(&mut self) {
        self.entity.templates.push(TemplateInfo::default());
        self.flags.edited = true;
    }

    /// Drop the template at `position`.
    pub fn remove_template(&mut self, position: usize) -> Result<(), CoreError> {
        if position >= self.entity.templates.len() {
            return Err(CoreError::RowNotFound {
                noun: "template",
                index: position,
            });
        }
        self.entity.templates.remove(position);
        self.flags.edited = true;
        Ok(())
    }

    /// Edit one field of the template at `position`.
    pub fn set_template_field(
        &mut self,
        position: usize,
        field: &str,
        value: &str,
    ) -> Result<(), CoreError> {
        let Some(template) = self.entity.templates.get_mut(position) else {
            return Err(CoreError::RowNotFound {
                noun: "template",
                index: position,
            });
        };
        match field {
            "Name" => value.clone_into(&mut template.name),
            "Path" => value.clone_into(&mut template.path),
            "ID" => value.clone_into(&mut template.id),
            other => {
                return Err(CoreError::NotEditable {
                    noun: "template",
                    field: other.to_owned(),
                });
            }
        }
        self.flags.edited = true;
        Ok(())
    }

    /// Edit one field of the OS descriptor.
    pub fn set_os_field(&mut self, field: &str, value: &str) -> Result<(), CoreError> {
        let os = &mut self.entity.os;
        match field {
            "Name" => value.clone_into(&mut os.name),
            "Family" => value.clone_into(&mut os.family),
            "Codename" => value.clone_into(&mut os.codename),
            "Version" => value.clone_into(&mut os.version),
            "IsoFile" => value.clone_into(&mut os.iso_file),
            "IsoSha256" => value.clone_into(&mut os.iso_sha256),
            "IsoUrl" => value.clone_into(&mut os.iso_url),
            other => {
                return Err(CoreError::NotEditable {
                    noun: "OS",
                    field: other.to_owned(),
                });
            }
        }
        self.flags.edited = true;
        Ok(())
    }
}
