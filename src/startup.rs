use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::TokenIssuer;
use crate::image_client::ImageStorageClient;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_donation, create_fundraiser, create_success_story, current_user, delete_fundraiser,
    delete_success_story, delete_user, get_donation, get_fundraiser, get_platform_stats,
    get_stats, greet, health_check, list_approved_fundraisers, list_donations, list_fundraisers,
    list_pending_fundraisers, list_success_stories, list_users, login, register,
    update_fundraiser_status, update_platform_stats, update_user,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    token_issuer: TokenIssuer,
    image_client: ImageStorageClient,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let token_issuer = web::Data::new(token_issuer);
    let image_client = web::Data::new(image_client);

    let server = HttpServer::new(move || {
        // Paths shared by public and protected methods are split into
        // method-guarded resources so only the protected ones are wrapped.
        let jwt = JwtMiddleware::new(token_issuer.clone(), connection.get_ref().clone());

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(connection.clone())
            .app_data(token_issuer.clone())
            .app_data(image_client.clone())

            .route("/", web::get().to(greet))
            .route("/health_check", web::get().to(health_check))

            // Users
            .route("/users/login", web::post().to(login))
            .service(
                web::resource("/users/me")
                    .wrap(jwt.clone())
                    .route(web::get().to(current_user)),
            )
            .service(
                web::resource("/users")
                    .guard(guard::Post())
                    .route(web::post().to(register)),
            )
            .service(
                web::resource("/users")
                    .guard(guard::Get())
                    .wrap(jwt.clone())
                    .route(web::get().to(list_users)),
            )
            .service(
                web::resource("/users/{user_id}")
                    .wrap(jwt.clone())
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            )

            // Fundraisers
            .route("/fundraiser", web::post().to(create_fundraiser))
            .route("/fundraiser", web::get().to(list_fundraisers))
            .route("/fundraiser/status/pending", web::get().to(list_pending_fundraisers))
            .route("/fundraiser/status/approved", web::get().to(list_approved_fundraisers))
            .service(
                web::resource("/fundraiser/{fundraiser_id}/status")
                    .wrap(jwt.clone())
                    .route(web::patch().to(update_fundraiser_status)),
            )
            .service(
                web::resource("/fundraiser/{fundraiser_id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_fundraiser)),
            )
            .service(
                web::resource("/fundraiser/{fundraiser_id}")
                    .guard(guard::Delete())
                    .wrap(jwt.clone())
                    .route(web::delete().to(delete_fundraiser)),
            )

            // Donations
            .route("/donations", web::post().to(create_donation))
            .route("/donations", web::get().to(list_donations))
            .route("/donations/{donation_id}", web::get().to(get_donation))

            // Statistics
            .route("/stats", web::get().to(get_stats))
            .service(
                web::resource("/platform-stats")
                    .guard(guard::Get())
                    .route(web::get().to(get_platform_stats)),
            )
            .service(
                web::resource("/platform-stats")
                    .guard(guard::Put())
                    .wrap(jwt.clone())
                    .route(web::put().to(update_platform_stats)),
            )

            // Success stories
            .service(
                web::resource("/success-stories")
                    .guard(guard::Get())
                    .route(web::get().to(list_success_stories)),
            )
            .service(
                web::resource("/success-stories")
                    .guard(guard::Post())
                    .wrap(jwt.clone())
                    .route(web::post().to(create_success_story)),
            )
            .service(
                web::resource("/success-stories/{story_id}")
                    .wrap(jwt)
                    .route(web::delete().to(delete_success_story)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
