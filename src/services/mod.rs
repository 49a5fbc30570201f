pub mod cards;
pub mod mail;
pub mod media;
pub mod spam;
pub mod tokens;

pub use mail::{Mailer, NoopMailer, OutgoingMail, SmtpMailer};
pub use media::MediaStorage;
pub use spam::SpamGuard;
pub use tokens::TokenIssuer;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{AnimeListing, CatalogError, CatalogService};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod staff_service;
pub mod staff_service_impl;
pub use staff_service::{AnimeImageSlot, StaffError, StaffService, Upload};
pub use staff_service_impl::SeaOrmStaffService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::{CommentError, CommentService};
pub use comment_service_impl::SeaOrmCommentService;

pub mod voiceover_service;
pub mod voiceover_service_impl;
pub use voiceover_service::{VoiceoverError, VoiceoverService};
pub use voiceover_service_impl::SeaOrmVoiceoverService;

pub mod support_service;
pub mod support_service_impl;
pub use support_service::{SupportError, SupportService};
pub use support_service_impl::SeaOrmSupportService;

pub mod release_service;
pub mod release_service_impl;
pub use release_service::{AuthOutcome, ReleaseError, ReleaseService, UpdateOptions};
pub use release_service_impl::MyAnimeListReleaseService;
