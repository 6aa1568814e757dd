use crate::{
    api::{calendar, leave_request, member},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

// Helper to build per-route limiter
fn build_limiter(
    requests_per_min: u32,
) -> Option<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let (Some(login_limiter), Some(protected_limiter)) = (
        build_limiter(config.rate_login_per_min),
        build_limiter(config.rate_protected_per_min),
    ) else {
        tracing::error!("Invalid rate limit configuration, routes not registered");
        return;
    };

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            ),
    );

    // Protected routes; every handler takes an AuthUser
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/pending, registered before /leave/{id}
                    .service(
                        web::resource("/pending").route(web::get().to(leave_request::pending_leaves)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    )
                    // /leave/{id}/override
                    .service(
                        web::resource("/{id}/override")
                            .route(web::put().to(leave_request::override_leave)),
                    )
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::post().to(leave_request::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/members")
                    .service(web::resource("").route(web::post().to(member::register_member)))
                    .service(web::resource("/{id}").route(web::get().to(member::get_member)))
                    .service(
                        web::resource("/{id}/balance").route(web::get().to(member::member_balance)),
                    ),
            )
            .service(
                web::scope("/calendar")
                    .service(
                        web::resource("/working-days")
                            .route(web::post().to(calendar::working_days)),
                    )
                    .service(
                        web::resource("/check-overlap")
                            .route(web::post().to(calendar::check_overlap)),
                    )
                    .service(
                        web::resource("/holidays")
                            .route(web::get().to(calendar::list_holidays))
                            .route(web::post().to(calendar::add_holiday)),
                    ),
            ),
    );
}

// LOGIN (email)
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new token pair
