use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

/// Per-call knobs of the apply operation.
///
/// `force_update` switches the change detector from the last-applied
/// annotation comparison to deep structural equality. `save_configuration`
/// controls whether successful writes record the applied configuration.
/// `owner` is appended to the object's owner references before any write.
#[derive(Clone, Debug)]
pub struct ApplyOptions {
    pub force_update: bool,
    pub save_configuration: bool,
    pub owner: Option<OwnerReference>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            force_update: false,
            save_configuration: true,
            owner: None,
        }
    }
}

impl ApplyOptions {
    pub fn force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    pub fn save_configuration(mut self, save_configuration: bool) -> Self {
        self.save_configuration = save_configuration;
        self
    }

    pub fn owner(mut self, owner: OwnerReference) -> Self {
        self.owner = Some(owner);
        self
    }
}
