pub const CLASS_CONTAINER: &str = "preview";
pub const CLASS_LOADING: &str = "preview__loading";
pub const CLASS_ERROR: &str = "preview__error";
pub const CLASS_IMAGE: &str = "preview__image";
pub const CLASS_ICON_LOADER: &str = "icon icon--loader-circle animate-spin text-foreground";
pub const CLASS_ICON_ERROR: &str = "icon icon--circle-x text-destructive";
pub const CLASS_DESTRUCTIVE: &str = "text-center text-destructive";
